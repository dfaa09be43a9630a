mod auth_test;
mod classes_test;
mod me_test;
mod sessions_test;
