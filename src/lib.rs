pub mod analyzers;
pub mod charts;
pub mod cleaner;
pub mod features;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod table;
pub mod temporal;
