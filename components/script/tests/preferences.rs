/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Changes the process-wide preferences, so it lives in its own test binary and keeps
//! everything in a single test.

use script::dom::bindings::error::Error;
use script::js::{JSObject, JSVal};
use script::script_thread::ScriptThread;
use xdm_config::prefs::{self, Preferences};
use xdm_url::ImmutableOrigin;

#[test]
fn test_preferences_limit_post_message() {
    let thread = ScriptThread::new();
    let window = thread.new_top_level(ImmutableOrigin::new_opaque());
    let buffer = JSObject::new_array_buffer(vec![0; 8]);

    let mut preferences = Preferences::default();
    preferences.dom_postmessage_transfer_enabled = false;
    preferences.dom_structured_clone_max_depth = 2;
    prefs::set(preferences);

    window.run_script(|window| {
        let result = window.post_message(&JSVal::Null, "*", std::slice::from_ref(&buffer));
        assert!(matches!(result, Err(Error::DataClone(_))));
        assert!(!buffer.is_detached());

        let shallow = JSVal::from(JSObject::new_array(vec![JSVal::from(
            JSObject::new_ordinary(),
        )]));
        assert_eq!(window.post_message(&shallow, "*", &[]), Ok(()));

        let deep = JSVal::from(JSObject::new_array(vec![JSVal::from(JSObject::new_array(
            vec![JSVal::from(JSObject::new_ordinary())],
        ))]));
        assert!(matches!(
            window.post_message(&deep, "*", &[]),
            Err(Error::DataClone(_))
        ));
    });

    prefs::set(Preferences::default());
    window.run_script(|window| {
        assert_eq!(
            window.post_message(&JSVal::Null, "*", std::slice::from_ref(&buffer)),
            Ok(())
        );
    });
    assert!(buffer.is_detached());
    assert_eq!(thread.run_until_idle(), 2);
}
