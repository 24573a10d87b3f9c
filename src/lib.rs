pub mod constants;
pub mod env_state;
pub mod jpl_ephem;
pub mod kernel_context;
pub mod kernel_errors;

pub use jpl_ephem::state_vector::StateVector;
pub use kernel_context::KernelContext;
pub use kernel_errors::KernelError;
