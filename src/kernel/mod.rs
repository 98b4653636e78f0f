//! Text kernels: meta-kernel assembly and the kernel variable pool

pub mod meta;
pub mod pool;

pub use meta::{make_meta, resolve_kernels_to_load, MetaKernel, KERNELS_SYMBOL};
pub use pool::{parse_text_kernel, Assignment, KernelPool, PoolValue};
