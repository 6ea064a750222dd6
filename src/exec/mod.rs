pub(crate) mod executor;
pub(crate) mod nodes;
pub(crate) mod probe;
pub(crate) mod runtime;
pub(crate) mod swap;
