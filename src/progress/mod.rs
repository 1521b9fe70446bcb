pub(crate) mod spinner;
pub(crate) mod tracker;
