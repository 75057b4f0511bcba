mod clean;
mod core;
mod pool;
mod staleness;
mod utils;

pub use clean::clean;
pub use core::execute;
pub use pool::{CompileTask, run_compile_tasks};
pub use staleness::needs_recompile;
pub use utils::{object_file_path, write_dep_record};
