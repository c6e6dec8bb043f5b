use crate::user::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub name: String,
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub name: String,
    pub users: Vec<User>,
}

impl Holding {
    pub fn new(name: impl Into<String>, companies: Vec<Company>) -> Self {
        Holding {
            name: name.into(),
            companies,
        }
    }
}

impl Company {
    pub fn new(name: impl Into<String>, users: Vec<User>) -> Self {
        Company {
            name: name.into(),
            users,
        }
    }
}
