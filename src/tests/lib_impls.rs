use crate::{change::ChangeError, records::Records, value::FieldValue, GetKey, Record};

impl GetKey<i64> for TestStruct {
    fn key(&self) -> &i64 {
        &self.key
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TestStruct {
    pub(crate) key: i64,
    pub(crate) name: String,
    pub(crate) team: String,
    pub(crate) age: i64,
    pub(crate) nickname: Option<String>,
}

impl TestStruct {
    pub(crate) fn new(key: i64, name: &str, team: &str, age: i64) -> Self {
        Self {
            key,
            name: String::from(name),
            team: String::from(team),
            age,
            nickname: None,
        }
    }

    pub(crate) fn nickname(mut self, nickname: &str) -> Self {
        self.nickname = Some(String::from(nickname));
        self
    }
}

impl Record for TestStruct {
    fn fields() -> &'static [&'static str] {
        &["id", "name", "team", "age", "nickname"]
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.key.into(),
            "name" => self.name.as_str().into(),
            "team" => self.team.as_str().into(),
            "age" => self.age.into(),
            "nickname" => self.nickname.clone().into(),
            _ => return None,
        })
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), ChangeError> {
        match (name, value) {
            ("id", FieldValue::Int(key)) => self.key = key,
            ("id", _) => return Err(mismatch("id", "int")),
            ("name", FieldValue::Text(name)) => self.name = name,
            ("name", _) => return Err(mismatch("name", "text")),
            ("team", FieldValue::Text(team)) => self.team = team,
            ("team", _) => return Err(mismatch("team", "text")),
            ("age", FieldValue::Int(age)) => self.age = age,
            ("age", _) => return Err(mismatch("age", "int")),
            ("nickname", FieldValue::Text(nickname)) => self.nickname = Some(nickname),
            ("nickname", FieldValue::Null) => self.nickname = None,
            ("nickname", _) => return Err(mismatch("nickname", "text")),
            (other, _) => return Err(ChangeError::UnknownField(String::from(other))),
        }
        Ok(())
    }
}

fn mismatch(field: &'static str, expected: &'static str) -> ChangeError {
    ChangeError::TypeMismatch { field, expected }
}

pub(crate) fn people_rows() -> Vec<TestStruct> {
    vec![
        TestStruct::new(1, "anna", "blue", 30).nickname("annie"),
        TestStruct::new(2, "bert", "red", 25),
        TestStruct::new(3, "carl", "blue", 41).nickname("charlie"),
        TestStruct::new(4, "dora", "red", 35),
        TestStruct::new(5, "emil", "blue", 19),
    ]
}

pub(crate) fn people() -> Records<TestStruct> {
    Records::new(people_rows())
}
