#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        let _ = serde_json::from_slice::<groupchat_client::ServerMessage>(data);
        return;
    };

    // Any accepted frame must also deserialize as a typed server message.
    if groupchat_client::decode(raw).is_ok() {
        assert!(serde_json::from_str::<groupchat_client::ServerMessage>(raw).is_ok());
    }
});
