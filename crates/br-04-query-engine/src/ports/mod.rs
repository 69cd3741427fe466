pub mod inbound;

pub use inbound::QueryEngineApi;
pub use shared_types::GraphApi;
