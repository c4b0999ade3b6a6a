//! Built-in Feishu interactive card

/// Template used when neither a template file nor an inline message is set
///
/// Downstream consumers depend on this exact JSON shape.
pub const DEFAULT_TEMPLATE: &str = r##"
{
  "msg_type":"interactive",
  "card":{
    "config":{
      "wide_screen_mode":true,
      "enable_forward":true
    },
    "header":{
      "title":{
        "tag":"plain_text",
        "content":"{{ Repo.FullName }}"
      }
    },
    "elements":[
      {
        "tag":"markdown",
        "content":"{{#success Build.Status }}✅{{/success}}{{#failure Build.Status}}❌{{/failure}} Build [#{{ Build.Number }}]({{ Build.Link }}) {{ Build.Status }}.\n📝 Commit by {{ Commit.AuthorName }} on {{ Commit.Branch }}:\n{{ Commit.Message }}"
      },
      {
        "tag":"note",
        "elements":[
          {
            "tag":"plain_text",
            "content":"@{{ datetime Build.Started '2006-01-02 15:04:05' '' }} to @{{ datetime Build.Finished '2006-01-02 15:04:05' '' }}."
          }
        ]
      }
    ]
  }
}"##;
