//! Native plugin library used by the archive loading tests.
//!
//! Built as a `cdylib`, packed into `.plugin` archives by the tests in
//! `tests/`, and mapped through [`plugload::FolderScanner`]. Instances of
//! the `greeting` capability are plain `String`s so their type identity
//! survives the library boundary.

use plugload::Constructed;

/// Greeting produced by [`ENGLISH_GREETING`].
pub const ENGLISH_TEXT: &str = "hello from a native plugin";

fn english() -> Constructed {
    Ok(Box::new(ENGLISH_TEXT.to_owned()))
}

fn sorted() -> Constructed {
    Ok(Box::new(vec![1_u32, 2, 3]))
}

fn unavailable() -> Constructed {
    Err("greeting dictionary unavailable".to_owned())
}

plugload::declare_plugin!(
    /// A `greeting` plugin built with a zero-argument constructor.
    ENGLISH_GREETING,
    implements = ["greeting"],
    constructor = english,
);

plugload::declare_plugin!(
    /// A plugin for an unrelated capability.
    NUMBER_SORTER,
    implements = ["sorter"],
    constructor = sorted,
);

plugload::declare_plugin!(
    /// A `greeting` plugin whose constructor always fails.
    BROKEN_GREETING,
    implements = ["greeting"],
    constructor = unavailable,
);
