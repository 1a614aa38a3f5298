//! Purpose: Concrete settings destination populated from definition files.
//! Exports: `StubSettings`.
//! Role: Default binding target for the parsing pipeline; other targets plug in via `SettingsTarget`.
//! Invariants: Slot names match definition settings exactly and case-sensitively.

use serde::Serialize;

use crate::core::bind::{SettingsTarget, Slot};

/// Settings of one virtual service endpoint. Every slot holds the trimmed
/// string from the definition line; interpretation (status codes, URLs) is
/// the hosting layer's concern.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StubSettings {
    pub method: Option<String>,
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub status_code: Option<String>,
    pub body: Option<String>,
}

impl StubSettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsTarget for StubSettings {
    const SLOTS: &'static [Slot<Self>] = &[
        Slot {
            name: "Method",
            assign: |settings, value| settings.method = Some(value),
        },
        Slot {
            name: "Url",
            assign: |settings, value| settings.url = Some(value),
        },
        Slot {
            name: "ContentType",
            assign: |settings, value| settings.content_type = Some(value),
        },
        Slot {
            name: "StatusCode",
            assign: |settings, value| settings.status_code = Some(value),
        },
        Slot {
            name: "Body",
            assign: |settings, value| settings.body = Some(value),
        },
    ];
}
