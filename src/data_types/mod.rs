pub mod datasource;
pub mod plot_configs;
pub mod viewport;

pub use datasource::*;
pub use plot_configs::*;
pub use viewport::*;
