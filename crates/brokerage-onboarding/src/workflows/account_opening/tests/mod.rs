mod common;
mod skeleton;
