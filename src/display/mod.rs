//! Display components for the presentation context

pub mod consumer;
pub mod headless;
pub mod surface;

pub use consumer::PresentationConsumer;
pub use headless::HeadlessSurface;
pub use surface::PresentationSurface;
