pub(crate) mod combine;
pub(crate) mod events;
