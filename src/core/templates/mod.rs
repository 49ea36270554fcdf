//! Template layer.
//!
//! - [`functions`]: the function table templates can call
//! - [`helpers`]: general-purpose helpers backing that table
//! - [`renderer`]: loads a template file and renders it with Tera

pub mod functions;
pub mod helpers;
pub mod renderer;

pub use functions::{Args, FunctionRegistry};
pub use renderer::Renderer;
