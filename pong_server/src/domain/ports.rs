// Port for retrieving wall-clock time (stamped into every snapshot).
pub trait Clock: Send + Sync {
    fn now_epoch_millis(&self) -> u64;
}
