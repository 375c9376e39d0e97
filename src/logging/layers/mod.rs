use tracing_subscriber::layer::Layer;

pub mod cloudwatch;
pub mod console;
pub mod file;

/// Boxed layer type that can wrap any concrete subscriber layer.
pub type BoxLayer<S> = Box<dyn Layer<S> + Send + Sync>;
