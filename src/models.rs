//! Wire data model shared by the gateway, session manager and pages.
//! Field names follow the server's camelCase JSON; everything except
//! identity/role is defaulted so partial records (older servers, stubs)
//! still deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authorization role. `platform_admin` satisfies any admin requirement,
/// `college_admin` only the college-admin requirement, `student` only
/// student-scoped checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    CollegeAdmin,
    PlatformAdmin,
}

impl Role {
    pub fn satisfies(self, required: Role) -> bool {
        match required {
            Role::Student => self == Role::Student,
            Role::CollegeAdmin => matches!(self, Role::CollegeAdmin | Role::PlatformAdmin),
            Role::PlatformAdmin => self == Role::PlatformAdmin,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::CollegeAdmin | Role::PlatformAdmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::CollegeAdmin => "college_admin",
            Role::PlatformAdmin => "platform_admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub role: Role,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub semester: i32,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub college_id: u64,
    #[serde(default)]
    pub college_code: String,
    #[serde(default)]
    pub college_name: String,
    #[serde(default)]
    pub college_logo_url: String,
}

fn default_true() -> bool { true }

/// Shallow profile merge applied by the session manager after a profile edit.
/// `None` leaves the current value untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub department: Option<String>,
    pub semester: Option<i32>,
    pub is_public: Option<bool>,
}

impl UserPatch {
    pub fn apply(&self, user: &mut User) {
        if let Some(v) = &self.name { user.name = v.clone(); }
        if let Some(v) = &self.profile_picture { user.profile_picture = v.clone(); }
        if let Some(v) = &self.bio { user.bio = v.clone(); }
        if let Some(v) = &self.department { user.department = v.clone(); }
        if let Some(v) = self.semester { user.semester = v; }
        if let Some(v) = self.is_public { user.is_public = v; }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Generic `{message}` acknowledgement used by register, friend actions,
/// deletes and the like.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub college_code: String,
    pub student_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub semester: Option<i32>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncement {
    pub title: String,
    pub content: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub seller_id: u64,
    #[serde(default)]
    pub seller: Option<User>,
    #[serde(default)]
    pub college_id: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListing {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
}

/// Group record: `auto` groups mirror department/semester cohorts, `public`
/// groups are admin-created clubs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub member_count: i64,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub semester: i32,
    /// Membership role within the group ("member", "admin"), not a platform role.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub joined_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub avatar: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FriendProfile {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub semester: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: u64,
    #[serde(default)]
    pub status: String,
    pub friend: FriendProfile,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSender {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_picture: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub conversation_type: String,
    #[serde(default)]
    pub conversation_id: String,
    pub sender: MessageSender,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default)]
    pub conversation_type: String,
    pub conversation_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub last_message_time: String,
    #[serde(default)]
    pub unread_count: i64,
    #[serde(default)]
    pub participant: Option<MessageSender>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub content: String,
    pub conversation_type: String,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub profile_picture: String,
    pub bio: String,
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub students: Vec<FriendProfile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollege {
    pub college_code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub logo_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollegeAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
    pub college_code: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollegeStat {
    #[serde(default)]
    pub college_code: String,
    #[serde(default)]
    pub college_name: String,
    #[serde(default)]
    pub student_count: i64,
    #[serde(default)]
    pub listing_count: i64,
    #[serde(default)]
    pub active_listings: i64,
}

/// Platform-wide totals plus the per-college breakdown; the breakdown doubles
/// as the platform admin's college list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    #[serde(default)]
    pub total_colleges: i64,
    #[serde(default)]
    pub total_students: i64,
    #[serde(default)]
    pub total_listings: i64,
    #[serde(default)]
    pub college_stats: Vec<CollegeStat>,
}
