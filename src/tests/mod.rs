// Test suite

pub mod helpers;

pub mod cache_tests;
pub mod composer_tests;
pub mod external_search_tests;
pub mod quota_tests;
