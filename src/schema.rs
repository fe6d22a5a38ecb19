//! Platform-managed configuration injected into every served package.
//!
//! Before a package or chart leaves the API, [`augment`] adds an `onyxia`
//! object to the root of its configuration schema:
//!
//! | Property | Type | Default | Hints |
//! |----------|------|---------|-------|
//! | `friendlyName` | string | package name | |
//! | `userDefinedValues` | string | `""` | `x-onyxia.hidden` |
//! | `owner` | string | `"owner"` | `x-form` + `x-onyxia`, both `{{user.idep}}`, hidden |
//! | `share` | boolean | `false` | |
//!
//! The block is rebuilt on every call and replaces any existing `onyxia`
//! key. Augment request-scoped copies only; the catalog snapshot itself is
//! never modified.

use serde_json::{json, Value};

use crate::models::{Chart, Package, Property, XForm, XOnyxia};

/// Key of the injected block in the root schema.
pub const ONYXIA_PROPERTY: &str = "onyxia";

const USER_ID_TEMPLATE: &str = "{{user.idep}}";

/// Injects the `onyxia` property into `package`'s configuration schema.
pub fn augment(package: &mut Package) {
    let block = onyxia_property(package.name());
    insert_block(package.config_mut(), block);
}

/// Same as [`augment`] for a bare chart version.
pub fn augment_chart(chart: &mut Chart) {
    let block = onyxia_property(&chart.name);
    insert_block(&mut chart.config, block);
}

fn insert_block(config: &mut Property, block: Property) {
    config
        .properties_mut()
        .insert(ONYXIA_PROPERTY.to_string(), block);
}

/// Builds the `onyxia` block for a package named `package_name`.
pub fn onyxia_property(package_name: &str) -> Property {
    let friendly_name = Property::leaf(
        "string",
        "Custom name",
        "Service custom name",
        Value::String(package_name.to_string()),
    );

    let mut user_defined_values = Property::leaf(
        "string",
        "User defined values",
        "Values defined by the end user",
        json!(""),
    );
    user_defined_values.x_onyxia = Some(XOnyxia {
        overwrite_default_with: None,
        hidden: true,
    });

    let mut owner = Property::leaf("string", "Owner", "Owner of the chart", json!("owner"));
    owner.x_form = Some(XForm {
        value: Some(USER_ID_TEMPLATE.to_string()),
        hidden: true,
    });
    owner.x_onyxia = Some(XOnyxia {
        overwrite_default_with: Some(USER_ID_TEMPLATE.to_string()),
        hidden: true,
    });

    let share = Property::leaf(
        "boolean",
        "Share",
        "Enable share for this service",
        json!(false),
    );

    let mut block = Property {
        kind: Some("object".to_string()),
        description: Some("Onyxia specific configuration".to_string()),
        ..Default::default()
    };
    let properties = block.properties_mut();
    properties.insert("friendlyName".to_string(), friendly_name);
    properties.insert("userDefinedValues".to_string(), user_defined_values);
    properties.insert("owner".to_string(), owner);
    properties.insert("share".to_string(), share);
    block
}
