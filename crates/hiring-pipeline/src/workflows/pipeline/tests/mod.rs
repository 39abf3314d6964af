mod access;
mod common;
mod service;
