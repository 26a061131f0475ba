pub mod settings;

pub use settings::{
    DatabaseSettings, DeliverySettings, EvolutionSettings, MetaSettings, SecuritySettings, ServerSettings, Settings,
};
