pub mod db_utils;
pub mod draft_cache;
pub mod notifier;
pub mod signup_guard;
