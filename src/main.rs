#![allow(dead_code)]

mod btree;
mod buffer;
mod container;
mod error;
mod storage;

fn main() {}
