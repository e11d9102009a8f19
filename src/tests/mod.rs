//! Test suite for the block registry
//!
//! Tests are grouped by concern: a set of chat-bot blocks shared by the other
//! modules, end-to-end registry scenarios, and property-based checks of the
//! compatibility relation.
