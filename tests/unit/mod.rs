//! Pure building blocks exercised through the public API

mod test_config;
mod test_gesture;
mod test_layout;
