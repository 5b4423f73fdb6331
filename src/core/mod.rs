// Pipeline-layer modules and shared errors/models
pub mod dedup {
    pub use crate::dedup::*;
}

pub mod enrichment {
    pub use crate::enrichment::*;
}

pub mod errors {
    pub use crate::errors::*;
}

pub mod extract {
    pub use crate::extract::*;
}

pub mod ingestion {
    pub use crate::ingestion::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod normalize {
    pub use crate::normalize::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}
