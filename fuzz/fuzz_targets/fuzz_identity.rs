#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    let (name, color) = data;
    if let Ok(identity) = groupchat_client::Identity::new(name, color, "#4a90e2") {
        assert!(!identity.display_name().is_empty());
        assert!(!identity.color().trim().is_empty());
        let _ = serde_json::to_string(&identity.handshake());
    }
    if let Ok(message) = groupchat_client::OutgoingMessage::new(name) {
        assert_eq!(message.text(), message.text().trim());
    }
});
