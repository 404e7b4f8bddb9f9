//! Blocking `Sleeper` backed by `std::thread::sleep`.

use std::time::Duration;

use crate::application::ports::Sleeper;

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
