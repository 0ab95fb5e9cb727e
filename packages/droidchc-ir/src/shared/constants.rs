//! Well-known descriptors and synthetic field names

pub const INTENT_CLASS: &str = "Landroid/content/Intent;";
pub const STRING_CLASS: &str = "Ljava/lang/String;";
pub const OBJECT_CLASS: &str = "Ljava/lang/Object;";
pub const STRING_BUFFER_CLASS: &str = "Ljava/lang/StringBuffer;";
pub const CHAR_ARRAY: &str = "[C";

pub const CLINIT_SIGNATURE: &str = "<clinit>()V";

// Activity bookkeeping fields on the global heap
pub const PARENT_FIELD: &str = "parent";
pub const RESULT_FIELD: &str = "result";
pub const INTENT_FIELD: &str = "intent";

// Library summary fields
pub const MESSAGE_FIELD: &str = "message";
pub const HINT_FIELD: &str = "hint";

// Global heap relations
pub const HEAP_RELATION: &str = "H";
pub const INTENT_HEAP_RELATION: &str = "HI";
pub const LAUNCHED_INTENT_RELATION: &str = "I";
pub const STATIC_HEAP_RELATION: &str = "S";
pub const REACH_RELATION: &str = "ReachLH";
pub const FILTER_RELATION: &str = "CFilter";
