//! The authored ECMAScript whitelist.
//!
//! Tracks ES2017 plus the Annex B helpers that are harmless. Anything not
//! named here is removed from every tamed realm. Notable omissions: `eval`
//! and `globalThis` (ambient authority), `SharedArrayBuffer` and `Atomics`
//! (shared memory), the legacy `RegExp` statics, and `Error.captureStackTrace`.
//!
//! Every prototype table names `constructor` itself. Left to inheritance it
//! would resolve to plain retention and the constructor would be queued a
//! second time through its prototype.

use super::Permit::{KeepAccessor, KeepData, KeepDataInherited, MakeAccessor, MakeAccessorInherited};
use super::{Permit, PermitTable};
use crate::heap::WellKnownSymbol;

/// Global value properties (ES 18.1).
pub const GLOBAL_VALUES: &[&str] = &["Infinity", "NaN", "undefined"];

/// Global function properties (ES 18.2, B.2.1), `eval` excluded.
pub const GLOBAL_FUNCTIONS: &[&str] = &[
    "isFinite",
    "isNaN",
    "parseFloat",
    "parseInt",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "escape",
    "unescape",
];

pub const ERROR_SUBCLASSES: &[&str] = &[
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "URIError",
];

pub const TYPED_ARRAYS: &[&str] = &[
    "Int8Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "Float32Array",
    "Float64Array",
];

/// Root table for the global object.
pub fn global_permits() -> PermitTable {
    let mut root = PermitTable::new()
        .with_all(GLOBAL_VALUES.iter().copied(), KeepData)
        .with_all(GLOBAL_FUNCTIONS.iter().copied(), KeepData)
        .with("Object", object())
        .with("Function", function())
        .with("Boolean", ctor(proto()))
        .with("Symbol", symbol())
        .with("Error", error())
        .with("Number", number())
        .with("Math", math())
        .with("Date", date())
        .with("String", string())
        .with("RegExp", regexp())
        .with("Array", array())
        .with("Map", map())
        .with("Set", set())
        .with("WeakMap", weak_map())
        .with("WeakSet", weak_set())
        .with("ArrayBuffer", array_buffer())
        .with("DataView", data_view())
        .with("JSON", PermitTable::new().with_all(["parse", "stringify"], KeepData))
        .with("Promise", promise())
        .with("Reflect", reflect())
        .with("Proxy", PermitTable::new().with("revocable", KeepData));

    for name in ERROR_SUBCLASSES {
        root = root.with(*name, ctor(error_proto()));
    }
    for name in TYPED_ARRAYS {
        root = root.with(*name, typed_array());
    }
    root
}

/// A prototype table with its `constructor` back-link.
fn proto() -> PermitTable {
    PermitTable::new().with("constructor", MakeAccessor)
}

/// A constructor whose only permitted own property is `prototype`.
fn ctor(prototype: PermitTable) -> PermitTable {
    PermitTable::new().with("prototype", prototype)
}

fn methods(table: PermitTable, names: &[&str], permit: Permit) -> PermitTable {
    table.with_all(names.iter().copied(), permit)
}

fn object() -> PermitTable {
    let statics = [
        "assign",
        "create",
        "defineProperties",
        "defineProperty",
        "entries",
        "freeze",
        "getOwnPropertyDescriptor",
        "getOwnPropertyDescriptors",
        "getOwnPropertyNames",
        "getOwnPropertySymbols",
        "getPrototypeOf",
        "is",
        "isExtensible",
        "isFrozen",
        "isSealed",
        "keys",
        "preventExtensions",
        "seal",
        "setPrototypeOf",
        "values",
    ];
    let prototype = PermitTable::new()
        // B.2.2
        .with_all(
            [
                "__defineGetter__",
                "__defineSetter__",
                "__lookupGetter__",
                "__lookupSetter__",
            ],
            KeepData,
        )
        .with_all(
            [
                "constructor",
                "hasOwnProperty",
                "isPrototypeOf",
                "propertyIsEnumerable",
                "toLocaleString",
                "toString",
                "valueOf",
            ],
            MakeAccessorInherited,
        )
        .with_all(
            [
                WellKnownSymbol::Iterator,
                WellKnownSymbol::ToPrimitive,
                WellKnownSymbol::ToStringTag,
                WellKnownSymbol::Unscopables,
            ],
            KeepDataInherited,
        );

    methods(PermitTable::new(), &statics, KeepData).with("prototype", prototype)
}

fn function() -> PermitTable {
    let prototype = proto()
        .with_all(["apply", "bind", "call", "toString"], KeepData)
        .with(WellKnownSymbol::HasInstance, KeepDataInherited)
        // instances
        .with_all(["length", "name", "prototype"], KeepDataInherited);
    ctor(prototype)
}

fn symbol() -> PermitTable {
    let prototype = proto().with("description", KeepAccessor);
    PermitTable::new()
        .with_all(
            WellKnownSymbol::ALL
                .iter()
                .map(|symbol| symbol.description()),
            KeepData,
        )
        .with_all(["for", "keyFor"], KeepData)
        .with("prototype", prototype)
}

fn error_proto() -> PermitTable {
    proto().with_all(["message", "name"], MakeAccessor)
}

fn error() -> PermitTable {
    ctor(error_proto())
}

fn number() -> PermitTable {
    let statics = [
        "EPSILON",
        "isFinite",
        "isInteger",
        "isNaN",
        "isSafeInteger",
        "MAX_SAFE_INTEGER",
        "MAX_VALUE",
        "MIN_SAFE_INTEGER",
        "MIN_VALUE",
        "NaN",
        "NEGATIVE_INFINITY",
        "parseFloat",
        "parseInt",
        "POSITIVE_INFINITY",
    ];
    let prototype = methods(proto(), &["toExponential", "toFixed", "toPrecision"], KeepData);
    methods(PermitTable::new(), &statics, KeepData).with("prototype", prototype)
}

fn math() -> PermitTable {
    let constants = ["E", "LN10", "LN2", "LOG10E", "LOG2E", "PI", "SQRT1_2", "SQRT2"];
    let functions = [
        "abs", "acos", "acosh", "asin", "asinh", "atan", "atanh", "atan2", "cbrt", "ceil",
        "clz32", "cos", "cosh", "exp", "expm1", "floor", "fround", "hypot", "imul", "log",
        "log1p", "log10", "log2", "max", "min", "pow",
        // non-deterministic, kept on purpose
        "random",
        "round", "sign", "sin", "sinh", "sqrt", "tan", "tanh", "trunc",
    ];
    methods(methods(PermitTable::new(), &constants, KeepData), &functions, KeepData)
}

/// Date prototype methods, including the B.2.4 legacy trio.
pub const DATE_METHODS: &[&str] = &[
    "getDate",
    "getDay",
    "getFullYear",
    "getHours",
    "getMilliseconds",
    "getMinutes",
    "getMonth",
    "getSeconds",
    "getTime",
    "getTimezoneOffset",
    "getUTCDate",
    "getUTCDay",
    "getUTCFullYear",
    "getUTCHours",
    "getUTCMilliseconds",
    "getUTCMinutes",
    "getUTCMonth",
    "getUTCSeconds",
    "setDate",
    "setFullYear",
    "setHours",
    "setMilliseconds",
    "setMinutes",
    "setMonth",
    "setSeconds",
    "setTime",
    "setUTCDate",
    "setUTCFullYear",
    "setUTCHours",
    "setUTCMilliseconds",
    "setUTCMinutes",
    "setUTCMonth",
    "setUTCSeconds",
    "toDateString",
    "toISOString",
    "toJSON",
    "toLocaleDateString",
    "toLocaleString",
    "toLocaleTimeString",
    "toTimeString",
    "toUTCString",
    "getYear",
    "setYear",
    "toGMTString",
];

fn date() -> PermitTable {
    // `now` and the no-argument constructor leak the clock; both are kept.
    methods(PermitTable::new(), &["now", "parse", "UTC"], KeepData)
        .with("prototype", methods(proto(), DATE_METHODS, KeepData))
}

/// String prototype methods, including B.2.3 and the non-standard trims.
pub const STRING_METHODS: &[&str] = &[
    "charAt",
    "charCodeAt",
    "codePointAt",
    "concat",
    "endsWith",
    "includes",
    "indexOf",
    "lastIndexOf",
    "localeCompare",
    "match",
    "normalize",
    "padEnd",
    "padStart",
    "repeat",
    "replace",
    "search",
    "slice",
    "split",
    "startsWith",
    "substring",
    "toLocaleLowerCase",
    "toLocaleUpperCase",
    "toLowerCase",
    "toUpperCase",
    "trim",
    "substr",
    "anchor",
    "big",
    "blink",
    "bold",
    "fixed",
    "fontcolor",
    "fontsize",
    "italics",
    "link",
    "small",
    "strike",
    "sub",
    "sup",
    "trimLeft",
    "trimRight",
];

fn string() -> PermitTable {
    let prototype = methods(proto(), STRING_METHODS, KeepData)
        .with(WellKnownSymbol::Iterator, KeepData)
        // instances
        .with("length", KeepDataInherited);
    methods(PermitTable::new(), &["fromCharCode", "fromCodePoint", "raw"], KeepData)
        .with("prototype", prototype)
}

pub const REGEXP_FLAG_ACCESSORS: &[&str] = &[
    "dotAll",
    "flags",
    "global",
    "ignoreCase",
    "multiline",
    "source",
    "sticky",
    "unicode",
];

fn regexp() -> PermitTable {
    let prototype = methods(proto(), &["exec", "test"], KeepData)
        .with_all(REGEXP_FLAG_ACCESSORS.iter().copied(), KeepAccessor)
        .with_all(
            [
                WellKnownSymbol::Match,
                WellKnownSymbol::Replace,
                WellKnownSymbol::Search,
                WellKnownSymbol::Split,
            ],
            KeepDataInherited,
        )
        // instances
        .with("lastIndex", KeepDataInherited);
    PermitTable::new()
        .with(WellKnownSymbol::Species, KeepAccessor)
        .with("prototype", prototype)
}

/// Array prototype methods. Each becomes an accessor so that code
/// assigning to an array instance's `map` shadows rather than fails.
pub const ARRAY_METHODS: &[&str] = &[
    "concat",
    "copyWithin",
    "entries",
    "every",
    "fill",
    "filter",
    "find",
    "findIndex",
    "forEach",
    "includes",
    "indexOf",
    "join",
    "keys",
    "lastIndexOf",
    "map",
    "pop",
    "push",
    "reduce",
    "reduceRight",
    "reverse",
    "shift",
    "slice",
    "some",
    "sort",
    "splice",
    "toLocaleString",
    "toString",
    "unshift",
    "values",
];

/// Entries of `Array.prototype[@@unscopables]`.
pub const ARRAY_UNSCOPABLES: &[&str] = &[
    "copyWithin",
    "entries",
    "fill",
    "find",
    "findIndex",
    "includes",
    "keys",
    "values",
];

fn array() -> PermitTable {
    let unscopables = methods(PermitTable::new(), ARRAY_UNSCOPABLES, KeepData);
    let prototype = methods(proto(), ARRAY_METHODS, MakeAccessor)
        .with(WellKnownSymbol::Iterator, KeepData)
        .with(WellKnownSymbol::Unscopables, unscopables);
    methods(PermitTable::new(), &["from", "isArray", "of"], KeepData)
        .with(WellKnownSymbol::Species, KeepAccessor)
        .with("prototype", prototype)
}

fn typed_array() -> PermitTable {
    PermitTable::new()
        .with("BYTES_PER_ELEMENT", KeepData)
        .with("prototype", proto().with("BYTES_PER_ELEMENT", KeepData))
}

fn map() -> PermitTable {
    let prototype = methods(
        proto(),
        &["clear", "delete", "entries", "forEach", "get", "has", "keys", "set", "values"],
        KeepData,
    )
    .with("size", KeepAccessor);
    PermitTable::new()
        .with(WellKnownSymbol::Species, KeepAccessor)
        .with("prototype", prototype)
}

fn set() -> PermitTable {
    let prototype = methods(
        proto(),
        &["add", "clear", "delete", "entries", "forEach", "has", "keys", "values"],
        KeepData,
    )
    .with("size", KeepAccessor);
    PermitTable::new()
        .with(WellKnownSymbol::Species, KeepAccessor)
        .with("prototype", prototype)
}

fn weak_map() -> PermitTable {
    ctor(methods(proto(), &["delete", "get", "has", "set"], KeepData))
}

fn weak_set() -> PermitTable {
    ctor(methods(proto(), &["add", "delete", "has"], KeepData))
}

fn array_buffer() -> PermitTable {
    let prototype = proto()
        .with("byteLength", KeepAccessor)
        .with("slice", KeepData);
    PermitTable::new()
        .with("isView", KeepData)
        .with(WellKnownSymbol::Species, KeepAccessor)
        .with("prototype", prototype)
}

pub const DATA_VIEW_METHODS: &[&str] = &[
    "getFloat32",
    "getFloat64",
    "getInt8",
    "getInt16",
    "getInt32",
    "getUint8",
    "getUint16",
    "getUint32",
    "setFloat32",
    "setFloat64",
    "setInt8",
    "setInt16",
    "setInt32",
    "setUint8",
    "setUint16",
    "setUint32",
];

fn data_view() -> PermitTable {
    let prototype = methods(proto(), DATA_VIEW_METHODS, KeepData).with_all(
        ["buffer", "byteLength", "byteOffset"],
        KeepAccessor,
    );
    ctor(prototype)
}

fn promise() -> PermitTable {
    let prototype = methods(proto(), &["catch", "finally", "then"], KeepData);
    methods(PermitTable::new(), &["all", "race", "reject", "resolve"], KeepData)
        .with(WellKnownSymbol::Species, KeepAccessor)
        .with("prototype", prototype)
}

fn reflect() -> PermitTable {
    let functions = [
        "apply",
        "construct",
        "defineProperty",
        "deleteProperty",
        "get",
        "getOwnPropertyDescriptor",
        "getPrototypeOf",
        "has",
        "isExtensible",
        "ownKeys",
        "preventExtensions",
        "set",
        "setPrototypeOf",
    ];
    methods(PermitTable::new(), &functions, KeepData)
}
