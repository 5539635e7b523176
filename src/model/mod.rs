pub use arena_core::genetics::GenomeLogic;
pub mod battle {
    pub use arena_core::battle::*;
}
pub mod breeding {
    pub use arena_core::breeding::*;
}
pub mod chain {
    pub use arena_core::chain::*;
}
pub mod config {
    pub use arena_core::config::*;
}
pub mod error {
    pub use arena_core::error::*;
}
pub mod genetics {
    pub use arena_core::genetics::*;
}
pub mod matchmaking {
    pub use arena_core::matchmaking::*;
}
pub mod metrics {
    pub use arena_core::metrics::*;
}
pub mod ranking {
    pub use arena_core::ranking::*;
}

pub mod state {
    pub use arena_data::*;
}
pub mod persistence {
    pub use arena_io::*;
}
