//! HTTP event receiver templating.

/// Render the XML definition of an HTTP receiver bound to a stream.
///
/// The engine parses this as a single line; the exact shape (attribute
/// order, spacing) is load-bearing and covered by tests.
pub fn render_receiver(receiver_id: &str, stream_name: &str, stream_version: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <eventReceiver name=\"httpReceiver{receiver_id}\" statistics=\"enable\" \
         trace=\"enable\" xmlns=\"http://wso2.org/carbon/eventreceiver\"> \
         <from eventAdapterType=\"http\"> \
         <property name=\"transports\">all</property> \
         <property name=\"basicAuthEnabled\">true</property> \
         </from> \
         <mapping customMapping=\"disable\" type=\"json\"/> \
         <to streamName=\"{stream_name}\" version=\"{stream_version}\"/> \
         </eventReceiver>"
    )
}
