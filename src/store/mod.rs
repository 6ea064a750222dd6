pub(crate) mod frame_cache;
pub(crate) mod state;
pub(crate) mod value;
pub(crate) mod values;
