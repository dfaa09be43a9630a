pub mod attendance_record;
pub mod attendance_session;
pub mod class;
pub mod class_student;
pub mod user;
pub mod user_class;

pub use attendance_record::Entity as AttendanceRecord;
pub use attendance_session::Entity as AttendanceSession;
pub use class::Entity as Class;
pub use class_student::Entity as ClassStudent;
pub use user::Entity as User;
pub use user_class::Entity as UserClass;
