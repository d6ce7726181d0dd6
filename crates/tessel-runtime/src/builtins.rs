#![forbid(unsafe_code)]

//! `if`, `unless`, `with` and `each`.

use std::collections::HashMap;

use tessel_core::Value;
use tessel_core::value::Fields;

use crate::helper::Helper;

pub(crate) fn register(helpers: &mut HashMap<String, Helper>) {
    helpers.insert(
        "if".to_owned(),
        Helper::block(|params: &[Value], _: &Fields, options| {
            if params.first().is_some_and(Value::is_truthy) {
                options.yield_default(&[])
            } else {
                options.yield_inverse(&[])
            }
        }),
    );
    helpers.insert(
        "unless".to_owned(),
        Helper::block(|params: &[Value], _: &Fields, options| {
            if params.first().is_some_and(Value::is_truthy) {
                options.yield_inverse(&[])
            } else {
                options.yield_default(&[])
            }
        }),
    );
    helpers.insert(
        "with".to_owned(),
        Helper::block(|params: &[Value], _: &Fields, options| match params.first() {
            Some(value) if value.is_truthy() => options.yield_default(std::slice::from_ref(value)),
            _ => options.yield_inverse(&[]),
        }),
    );
    helpers.insert("each".to_owned(), Helper::Each);
}
