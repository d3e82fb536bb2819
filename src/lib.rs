pub mod analysis;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod report;
pub mod types;
pub mod util;
