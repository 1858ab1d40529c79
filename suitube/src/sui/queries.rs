//! GraphQL documents. Object type filters are built per package id.

const VIDEO_FIELDS: &str = r#"
                fields {
                  id
                  title
                  description
                  cid
                  owner
                  is_short
                  category
                  tags
                  tips
                  views
                  likes
                  created_at
                  updated_at
                }"#;

const OWNER: &str = r#"
          owner {
            __typename
            ... on AddressOwner {
              owner
            }
          }"#;

pub fn video_type(package_id: &str) -> String {
    format!("{package_id}::VideoPlatform::Video")
}

pub fn user_profile_type(package_id: &str) -> String {
    format!("{package_id}::VideoPlatform::UserProfile")
}

pub fn list_videos(package_id: &str) -> String {
    format!(
        r#"query GetVideos($limit: Int, $offset: Int) {{
  videos: objects(
    filter: {{ type: "{ty}" }}
    first: $limit
    offset: $offset
  ) {{
    nodes {{
      id{OWNER}
      data {{
        content {{{VIDEO_FIELDS}
        }}
      }}
    }}
  }}
}}"#,
        ty = video_type(package_id)
    )
}

pub fn get_video() -> String {
    format!(
        r#"query GetVideo($id: ID!) {{
  object(id: $id) {{
    id{OWNER}
    data {{
      content {{{VIDEO_FIELDS}
      }}
    }}
  }}
}}"#
    )
}

pub fn videos_by_owner(package_id: &str) -> String {
    format!(
        r#"query GetVideosByOwner($owner: String!, $limit: Int) {{
  videos: objects(
    filter: {{ type: "{ty}", owner: $owner }}
    first: $limit
  ) {{
    nodes {{
      id
      data {{
        content {{{VIDEO_FIELDS}
        }}
      }}
    }}
  }}
}}"#,
        ty = video_type(package_id)
    )
}

pub fn user_profile(package_id: &str) -> String {
    format!(
        r#"query GetUserProfile($address: String!) {{
  user: objects(
    filter: {{ type: "{ty}", owner: $address }}
    first: 1
  ) {{
    nodes {{
      id
      data {{
        content {{
          fields {{
            wallet
            username
            is_verified
            subscribers
            subscribed_to
            total_earnings
            reputation_score
          }}
        }}
      }}
    }}
  }}
}}"#,
        ty = user_profile_type(package_id)
    )
}

pub const PLATFORM: &str = r#"query GetPlatform($id: ID!) {
  object(id: $id) {
    id
    data {
      content {
        fields {
          video_count
          platform_fee
        }
      }
    }
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_use_the_package_type() {
        let q = list_videos("0xpkg");
        assert!(q.contains(r#"type: "0xpkg::VideoPlatform::Video""#));
        assert!(q.contains("offset: $offset"));
        assert!(q.contains("cid"));

        let q = user_profile("0xpkg");
        assert!(q.contains("0xpkg::VideoPlatform::UserProfile"));
        assert!(q.contains("owner: $address"));
    }
}
