use relaymail::{Mailbox, Mailer, Message};

#[test]
#[ignore = "requires a local SMTP server listening on 127.0.0.1:2525"]
fn send_to_local_relay() {
    let message = Message::builder()
        .from("user@localhost")
        .to("root@localhost")
        .subject("Hello ß☺ example")
        .reply_to(Mailbox::new(Some("User".into()), "user@localhost".into()))
        .text_body("Hello ß☺ example")
        .html_body("<p>Hello ß☺ example</p>")
        .build()
        .unwrap();

    Mailer::builder("127.0.0.1")
        .port(2525)
        .build()
        .send(&message)
        .unwrap();
}
