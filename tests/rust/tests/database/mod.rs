//! SQLite storage tests
