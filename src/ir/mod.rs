pub(crate) mod frame;
pub(crate) mod program;
pub(crate) mod step;
