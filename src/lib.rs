pub mod country {
    pub mod centroid_table;
    pub mod lookup;
    pub mod name_table;
    pub mod table_lines;
}
pub mod region {
    pub mod regions;
}
pub mod render {
    pub mod country_renderer;
    pub mod projection;
    pub mod raster_surface;
    pub mod surface;
}
pub mod service {
    pub mod label_service;
    pub mod map_service;
    pub mod var_service;
}
pub mod shape {
    pub mod shp_reader;
}
pub mod util {
    pub mod env_service;
    pub mod log_service;
}
pub mod error;
pub mod prelude;
