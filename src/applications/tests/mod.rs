// src/applications/tests/mod.rs

mod validators_tests;
