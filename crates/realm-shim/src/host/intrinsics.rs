//! Primordials for one context.
//!
//! Builds what a conventional engine ships: the ES2017 constructors and
//! namespaces, `constructor` back-links, accessor properties, well-known
//! symbol methods and the `eval` evaluator, plus the newer or non-standard
//! extras real engines add (`globalThis`, `SharedArrayBuffer`, `Atomics`,
//! `Array.prototype.flat`, `Object.prototype.__proto__`, poison-pill
//! `Function.prototype.caller`, legacy `RegExp` statics, …).
//!
//! Each property gets its own function object. Engines that alias
//! `Number.parseFloat` to the global `parseFloat` would be caught by the
//! multiple-paths check.

use std::collections::{BTreeMap, BTreeSet};

use super::FunctionFlavor;
use crate::heap::{
    FunctionBehavior, Heap, HeapResult, ObjectHandle, PropertyDescriptor, PropertyKey, Value,
    WellKnownSymbol,
};
use crate::permits::standard::{
    ARRAY_METHODS, ARRAY_UNSCOPABLES, DATA_VIEW_METHODS, DATE_METHODS, ERROR_SUBCLASSES,
    GLOBAL_FUNCTIONS, REGEXP_FLAG_ACCESSORS, STRING_METHODS, TYPED_ARRAYS,
};

/// Knobs for modelling host deviations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrinsicsOptions {
    /// Function flavours the engine can evaluate.
    pub flavors: BTreeSet<FunctionFlavor>,
    /// Ship the legacy `Object.prototype` accessor helpers in a broken
    /// shape: one as an accessor, one missing, one non-callable.
    pub broken_legacy_accessors: bool,
}

impl Default for IntrinsicsOptions {
    fn default() -> Self {
        Self {
            flavors: FunctionFlavor::ALL.into_iter().collect(),
            broken_legacy_accessors: false,
        }
    }
}

/// A freshly built context.
#[derive(Debug, Clone)]
pub struct Intrinsics {
    pub global: ObjectHandle,
    /// Hidden prototypes of the non-plain function flavours.
    pub flavor_prototypes: BTreeMap<FunctionFlavor, ObjectHandle>,
}

struct Builder<'h> {
    heap: &'h mut Heap,
    object_proto: ObjectHandle,
    function_proto: ObjectHandle,
    global: ObjectHandle,
}

fn function_name(key: &PropertyKey) -> String {
    match key.as_str() {
        Some(name) => name.to_string(),
        None => format!("[{key}]"),
    }
}

impl Builder<'_> {
    fn define(
        &mut self,
        target: ObjectHandle,
        key: impl Into<PropertyKey>,
        desc: PropertyDescriptor,
    ) -> HeapResult<()> {
        self.heap.define_property(target, key, desc)?;
        Ok(())
    }

    fn function_with(
        &mut self,
        prototype: ObjectHandle,
        name: &str,
        behavior: FunctionBehavior,
    ) -> HeapResult<ObjectHandle> {
        let function = self.heap.alloc_function(Some(prototype), behavior);
        self.define(function, "length", PropertyDescriptor::readonly(0.0))?;
        self.define(function, "name", PropertyDescriptor::readonly(name))?;
        Ok(function)
    }

    fn function(&mut self, name: &str) -> HeapResult<ObjectHandle> {
        self.function_with(self.function_proto, name, FunctionBehavior::native(name))
    }

    fn method(
        &mut self,
        target: ObjectHandle,
        key: impl Into<PropertyKey>,
    ) -> HeapResult<ObjectHandle> {
        let key = key.into();
        let function = self.function(&function_name(&key))?;
        self.define(target, key, PropertyDescriptor::builtin(function))?;
        Ok(function)
    }

    fn methods(&mut self, target: ObjectHandle, names: &[&str]) -> HeapResult<()> {
        for name in names {
            self.method(target, *name)?;
        }
        Ok(())
    }

    fn constants(&mut self, target: ObjectHandle, values: &[(&str, f64)]) -> HeapResult<()> {
        for (name, value) in values {
            self.define(target, *name, PropertyDescriptor::frozen(*value))?;
        }
        Ok(())
    }

    /// Well-known symbol method with ES `@@toPrimitive`/`@@hasInstance`
    /// attributes (non-writable).
    fn readonly_method(
        &mut self,
        target: ObjectHandle,
        symbol: WellKnownSymbol,
        configurable: bool,
    ) -> HeapResult<()> {
        let function = self.function(&function_name(&symbol.key()))?;
        let desc = PropertyDescriptor::Data {
            value: Value::Object(function),
            writable: false,
            enumerable: false,
            configurable,
        };
        self.define(target, symbol, desc)
    }

    fn getter(&mut self, target: ObjectHandle, key: impl Into<PropertyKey>) -> HeapResult<()> {
        let key = key.into();
        let getter = self.function(&format!("get {}", function_name(&key)))?;
        self.define(target, key, PropertyDescriptor::accessor(Some(getter), None))
    }

    fn getter_setter(&mut self, target: ObjectHandle, key: impl Into<PropertyKey>) -> HeapResult<()> {
        let key = key.into();
        let name = function_name(&key);
        let getter = self.function(&format!("get {name}"))?;
        let setter = self.function(&format!("set {name}"))?;
        self.define(
            target,
            key,
            PropertyDescriptor::accessor(Some(getter), Some(setter)),
        )
    }

    fn to_string_tag(&mut self, target: ObjectHandle, tag: &str) -> HeapResult<()> {
        self.define(
            target,
            WellKnownSymbol::ToStringTag,
            PropertyDescriptor::readonly(tag),
        )
    }

    /// A namespace object such as `Math`, installed on the global.
    fn namespace(&mut self, name: &str) -> HeapResult<ObjectHandle> {
        let object = self.heap.alloc(Some(self.object_proto));
        self.define(self.global, name, PropertyDescriptor::builtin(object))?;
        Ok(object)
    }

    /// Link `ctor.prototype` and `prototype.constructor`.
    fn link(&mut self, ctor: ObjectHandle, prototype: ObjectHandle) -> HeapResult<()> {
        self.define(ctor, "prototype", PropertyDescriptor::frozen(prototype))?;
        self.define(prototype, "constructor", PropertyDescriptor::builtin(ctor))
    }

    /// A constructor installed on the global, with its prototype object.
    fn class_with(
        &mut self,
        name: &str,
        ctor_proto: ObjectHandle,
        proto_proto: ObjectHandle,
    ) -> HeapResult<(ObjectHandle, ObjectHandle)> {
        let ctor = self.function_with(ctor_proto, name, FunctionBehavior::native(name))?;
        let prototype = self.heap.alloc(Some(proto_proto));
        self.link(ctor, prototype)?;
        self.define(self.global, name, PropertyDescriptor::builtin(ctor))?;
        Ok((ctor, prototype))
    }

    fn class(&mut self, name: &str) -> HeapResult<(ObjectHandle, ObjectHandle)> {
        self.class_with(name, self.function_proto, self.object_proto)
    }

    fn species(&mut self, ctor: ObjectHandle) -> HeapResult<()> {
        self.getter(ctor, WellKnownSymbol::Species)
    }
}

/// Build one context on `heap`.
pub fn build(heap: &mut Heap, options: &IntrinsicsOptions) -> HeapResult<Intrinsics> {
    let object_proto = heap.alloc(None);
    let function_proto = heap.alloc_function(Some(object_proto), FunctionBehavior::native(""));
    let global = heap.alloc(Some(object_proto));
    let mut b = Builder {
        heap,
        object_proto,
        function_proto,
        global,
    };

    object(&mut b, options)?;
    let flavor_prototypes = function(&mut b, options)?;
    globals(&mut b)?;
    fundamentals(&mut b)?;
    numbers_and_dates(&mut b)?;
    text(&mut b)?;
    collections(&mut b)?;
    control_and_reflection(&mut b)?;
    extras(&mut b)?;

    Ok(Intrinsics {
        global,
        flavor_prototypes,
    })
}

fn object(b: &mut Builder<'_>, options: &IntrinsicsOptions) -> HeapResult<()> {
    let object_proto = b.object_proto;
    let ctor = b.function("Object")?;
    b.link(ctor, object_proto)?;
    b.define(b.global, "Object", PropertyDescriptor::builtin(ctor))?;
    b.methods(
        ctor,
        &[
            "assign",
            "create",
            "defineProperties",
            "defineProperty",
            "entries",
            "freeze",
            "fromEntries",
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
        ],
    )?;
    b.methods(
        object_proto,
        &[
            "hasOwnProperty",
            "isPrototypeOf",
            "propertyIsEnumerable",
            "toLocaleString",
            "toString",
            "valueOf",
        ],
    )?;

    if options.broken_legacy_accessors {
        b.getter(object_proto, "__defineGetter__")?;
        b.define(object_proto, "__defineSetter__", PropertyDescriptor::builtin(Value::Null))?;
        b.method(object_proto, "__lookupGetter__")?;
    } else {
        b.methods(
            object_proto,
            &[
                "__defineGetter__",
                "__defineSetter__",
                "__lookupGetter__",
                "__lookupSetter__",
            ],
        )?;
    }
    b.getter_setter(object_proto, "__proto__")
}

fn function(
    b: &mut Builder<'_>,
    options: &IntrinsicsOptions,
) -> HeapResult<BTreeMap<FunctionFlavor, ObjectHandle>> {
    let function_proto = b.function_proto;
    b.define(function_proto, "length", PropertyDescriptor::readonly(0.0))?;
    b.define(function_proto, "name", PropertyDescriptor::readonly(""))?;

    let ctor = b.function("Function")?;
    b.link(ctor, function_proto)?;
    b.define(b.global, "Function", PropertyDescriptor::builtin(ctor))?;
    b.methods(function_proto, &["apply", "bind", "call", "toString"])?;
    b.readonly_method(function_proto, WellKnownSymbol::HasInstance, false)?;

    // %ThrowTypeError%
    let thrower = b.heap.alloc_function(
        Some(function_proto),
        FunctionBehavior::Throwing {
            message: "'caller', 'callee', and 'arguments' properties may not be accessed".into(),
        },
    );
    b.heap.prevent_extensions(thrower)?;
    for name in ["caller", "arguments"] {
        b.define(
            function_proto,
            name,
            PropertyDescriptor::accessor(Some(thrower), Some(thrower)),
        )?;
    }

    let mut flavor_prototypes = BTreeMap::new();
    for flavor in &options.flavors {
        if *flavor == FunctionFlavor::Function {
            continue;
        }
        let prototype = b.heap.alloc(Some(function_proto));
        let flavor_ctor = b.function_with(ctor, flavor.name(), FunctionBehavior::native(flavor.name()))?;
        b.define(flavor_ctor, "prototype", PropertyDescriptor::frozen(prototype))?;
        b.define(prototype, "constructor", PropertyDescriptor::readonly(flavor_ctor))?;
        b.to_string_tag(prototype, flavor.name())?;
        flavor_prototypes.insert(*flavor, prototype);
    }
    Ok(flavor_prototypes)
}

fn globals(b: &mut Builder<'_>) -> HeapResult<()> {
    let global = b.global;
    b.constants(global, &[("Infinity", f64::INFINITY), ("NaN", f64::NAN)])?;
    b.define(global, "undefined", PropertyDescriptor::frozen(Value::Undefined))?;
    b.methods(global, GLOBAL_FUNCTIONS)?;
    b.method(global, "eval")?;
    Ok(())
}

fn fundamentals(b: &mut Builder<'_>) -> HeapResult<()> {
    let (_, boolean_proto) = b.class("Boolean")?;
    b.methods(boolean_proto, &["toString", "valueOf"])?;

    let (symbol, symbol_proto) = b.class("Symbol")?;
    for wk in WellKnownSymbol::ALL {
        b.define(symbol, wk.description(), PropertyDescriptor::frozen(wk))?;
    }
    b.methods(symbol, &["for", "keyFor"])?;
    b.methods(symbol_proto, &["toString", "valueOf"])?;
    b.getter(symbol_proto, "description")?;
    b.readonly_method(symbol_proto, WellKnownSymbol::ToPrimitive, true)?;
    b.to_string_tag(symbol_proto, "Symbol")?;

    let (error, error_proto) = b.class("Error")?;
    b.define(error_proto, "name", PropertyDescriptor::builtin("Error"))?;
    b.define(error_proto, "message", PropertyDescriptor::builtin(""))?;
    b.method(error_proto, "toString")?;
    for name in ERROR_SUBCLASSES {
        let (_, proto) = b.class_with(name, error, error_proto)?;
        b.define(proto, "name", PropertyDescriptor::builtin(*name))?;
        b.define(proto, "message", PropertyDescriptor::builtin(""))?;
    }
    Ok(())
}

fn numbers_and_dates(b: &mut Builder<'_>) -> HeapResult<()> {
    let (number, number_proto) = b.class("Number")?;
    b.constants(
        number,
        &[
            ("EPSILON", f64::EPSILON),
            ("MAX_SAFE_INTEGER", 9_007_199_254_740_991.0),
            ("MAX_VALUE", f64::MAX),
            ("MIN_SAFE_INTEGER", -9_007_199_254_740_991.0),
            ("MIN_VALUE", 5e-324),
            ("NaN", f64::NAN),
            ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
            ("POSITIVE_INFINITY", f64::INFINITY),
        ],
    )?;
    b.methods(
        number,
        &["isFinite", "isInteger", "isNaN", "isSafeInteger", "parseFloat", "parseInt"],
    )?;
    b.methods(
        number_proto,
        &["toExponential", "toFixed", "toLocaleString", "toPrecision", "toString", "valueOf"],
    )?;

    let math = b.namespace("Math")?;
    b.constants(
        math,
        &[
            ("E", std::f64::consts::E),
            ("LN10", std::f64::consts::LN_10),
            ("LN2", std::f64::consts::LN_2),
            ("LOG10E", std::f64::consts::LOG10_E),
            ("LOG2E", std::f64::consts::LOG2_E),
            ("PI", std::f64::consts::PI),
            ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
            ("SQRT2", std::f64::consts::SQRT_2),
        ],
    )?;
    b.methods(
        math,
        &[
            "abs", "acos", "acosh", "asin", "asinh", "atan", "atanh", "atan2", "cbrt", "ceil",
            "clz32", "cos", "cosh", "exp", "expm1", "floor", "fround", "hypot", "imul", "log",
            "log1p", "log10", "log2", "max", "min", "pow", "random", "round", "sign", "sin",
            "sinh", "sqrt", "tan", "tanh", "trunc",
        ],
    )?;
    b.to_string_tag(math, "Math")?;

    let (date, date_proto) = b.class("Date")?;
    b.methods(date, &["now", "parse", "UTC"])?;
    b.methods(date_proto, DATE_METHODS)?;
    b.methods(date_proto, &["toString", "valueOf"])?;
    b.readonly_method(date_proto, WellKnownSymbol::ToPrimitive, true)?;
    Ok(())
}

fn text(b: &mut Builder<'_>) -> HeapResult<()> {
    let (string, string_proto) = b.class("String")?;
    b.methods(string, &["fromCharCode", "fromCodePoint", "raw"])?;
    b.methods(string_proto, STRING_METHODS)?;
    b.methods(string_proto, &["toString", "valueOf", "matchAll", "trimStart", "trimEnd"])?;
    b.method(string_proto, WellKnownSymbol::Iterator)?;
    b.define(string_proto, "length", PropertyDescriptor::frozen(0.0))?;

    let (regexp, regexp_proto) = b.class("RegExp")?;
    b.species(regexp)?;
    for legacy in ["input", "lastMatch", "$1"] {
        b.getter_setter(regexp, legacy)?;
    }
    b.methods(regexp_proto, &["exec", "test", "toString", "compile"])?;
    for flag in REGEXP_FLAG_ACCESSORS {
        b.getter(regexp_proto, *flag)?;
    }
    for symbol in [
        WellKnownSymbol::Match,
        WellKnownSymbol::MatchAll,
        WellKnownSymbol::Replace,
        WellKnownSymbol::Search,
        WellKnownSymbol::Split,
    ] {
        b.method(regexp_proto, symbol)?;
    }
    Ok(())
}

fn collections(b: &mut Builder<'_>) -> HeapResult<()> {
    let (array, array_proto) = b.class("Array")?;
    b.methods(array, &["from", "isArray", "of"])?;
    b.species(array)?;
    b.methods(array_proto, ARRAY_METHODS)?;
    b.methods(array_proto, &["flat", "flatMap"])?;
    b.method(array_proto, WellKnownSymbol::Iterator)?;
    let unscopables = b.heap.alloc(None);
    for name in ARRAY_UNSCOPABLES.iter().chain(["flat", "flatMap"].iter()) {
        b.define(unscopables, *name, PropertyDescriptor::data(true))?;
    }
    b.define(
        array_proto,
        WellKnownSymbol::Unscopables,
        PropertyDescriptor::readonly(unscopables),
    )?;

    for (name, bytes) in TYPED_ARRAYS.iter().zip([1.0, 1.0, 1.0, 2.0, 2.0, 4.0, 4.0, 4.0, 8.0]) {
        let (ctor, proto) = b.class(name)?;
        b.constants(ctor, &[("BYTES_PER_ELEMENT", bytes)])?;
        b.constants(proto, &[("BYTES_PER_ELEMENT", bytes)])?;
    }

    for (name, methods) in [
        (
            "Map",
            &["clear", "delete", "entries", "forEach", "get", "has", "keys", "set", "values"][..],
        ),
        (
            "Set",
            &["add", "clear", "delete", "entries", "forEach", "has", "keys", "values"][..],
        ),
    ] {
        let (ctor, proto) = b.class(name)?;
        b.species(ctor)?;
        b.methods(proto, methods)?;
        b.getter(proto, "size")?;
        b.method(proto, WellKnownSymbol::Iterator)?;
        b.to_string_tag(proto, name)?;
    }
    for (name, methods) in [
        ("WeakMap", &["delete", "get", "has", "set"][..]),
        ("WeakSet", &["add", "delete", "has"][..]),
    ] {
        let (_, proto) = b.class(name)?;
        b.methods(proto, methods)?;
        b.to_string_tag(proto, name)?;
    }

    let (buffer, buffer_proto) = b.class("ArrayBuffer")?;
    b.method(buffer, "isView")?;
    b.species(buffer)?;
    b.getter(buffer_proto, "byteLength")?;
    b.method(buffer_proto, "slice")?;
    b.to_string_tag(buffer_proto, "ArrayBuffer")?;

    let (_, view_proto) = b.class("DataView")?;
    b.methods(view_proto, DATA_VIEW_METHODS)?;
    for accessor in ["buffer", "byteLength", "byteOffset"] {
        b.getter(view_proto, accessor)?;
    }
    b.to_string_tag(view_proto, "DataView")?;
    Ok(())
}

fn control_and_reflection(b: &mut Builder<'_>) -> HeapResult<()> {
    let json = b.namespace("JSON")?;
    b.methods(json, &["parse", "stringify"])?;
    b.to_string_tag(json, "JSON")?;

    let (promise, promise_proto) = b.class("Promise")?;
    b.methods(promise, &["all", "race", "reject", "resolve"])?;
    b.species(promise)?;
    b.methods(promise_proto, &["catch", "finally", "then"])?;
    b.to_string_tag(promise_proto, "Promise")?;

    let reflect = b.namespace("Reflect")?;
    b.methods(
        reflect,
        &[
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
        ],
    )?;

    let proxy = b.function("Proxy")?;
    b.define(b.global, "Proxy", PropertyDescriptor::builtin(proxy))?;
    b.method(proxy, "revocable")?;
    Ok(())
}

/// Properties a modern engine ships that the whitelist leaves out.
fn extras(b: &mut Builder<'_>) -> HeapResult<()> {
    let global = b.global;
    b.define(global, "globalThis", PropertyDescriptor::builtin(global))?;

    let (shared_buffer, shared_buffer_proto) = b.class("SharedArrayBuffer")?;
    b.getter(shared_buffer_proto, "byteLength")?;
    b.method(shared_buffer_proto, "slice")?;
    b.species(shared_buffer)?;

    let atomics = b.namespace("Atomics")?;
    b.methods(atomics, &["add", "load", "store", "wait", "notify"])?;

    let error = read_object(b.heap, global, "Error")?;
    b.method(error, "captureStackTrace")?;

    let promise = read_object(b.heap, global, "Promise")?;
    b.method(promise, "allSettled")?;
    Ok(())
}

fn read_object(heap: &Heap, object: ObjectHandle, name: &str) -> HeapResult<ObjectHandle> {
    heap.object(object)?
        .own_property(&PropertyKey::from(name))
        .and_then(PropertyDescriptor::value)
        .and_then(Value::as_object)
        .ok_or_else(|| crate::heap::HeapError::TypeError(format!("{name} is not an object")))
}
