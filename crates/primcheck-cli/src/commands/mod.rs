pub(crate) mod estimate;
pub(crate) mod helpers;
pub(crate) mod verify;
