mod common;
mod session;
mod swipes;
