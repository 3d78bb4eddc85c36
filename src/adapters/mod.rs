// Adapters layer: concrete clients for the two external data sources.

pub mod gemini;
pub mod pagespeed;

pub use gemini::GeminiResearcher;
pub use pagespeed::PageSpeedProbe;
