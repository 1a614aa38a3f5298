// Static setting-name to slot mapping; an unknown setting is a hard error, never a skip.
use crate::core::error::{Error, ErrorKind};

/// One writable slot on a settings destination: the exact name a definition
/// line uses and the assignment applied when that name matches.
pub struct Slot<T> {
    pub name: &'static str,
    pub assign: fn(&mut T, String),
}

/// A destination the parsing pipeline can populate. Slot names are matched
/// exactly and case-sensitively, in declaration order.
pub trait SettingsTarget: Sized + 'static {
    const SLOTS: &'static [Slot<Self>];
}

pub fn bind<T: SettingsTarget>(target: &mut T, name: &str, value: String) -> Result<(), Error> {
    let slot = T::SLOTS
        .iter()
        .find(|slot| slot.name == name)
        .ok_or_else(|| {
            Error::new(ErrorKind::Schema)
                .with_message(format!("unknown setting: {name}"))
                .with_hint("Setting names are case sensitive. Check the spelling and casing.")
        })?;
    (slot.assign)(target, value);
    Ok(())
}
