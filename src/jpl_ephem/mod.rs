pub mod kernel_index;
pub mod naif;
pub mod state_vector;
